/// Display version information
pub fn execute() {
    println!("feedgate {}", env!("CARGO_PKG_VERSION"));
    println!("Signature-gated feed replication");
}
