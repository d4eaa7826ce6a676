fn main() {
    if let Err(e) = playlist_downloader_lib::run() {
        eprintln!("Error: {:#}", e);
    }
}
