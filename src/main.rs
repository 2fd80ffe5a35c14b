fn main() {
    if let Err(e) = trade_journal_lib::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
