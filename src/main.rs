#[tokio::main]
async fn main() {
    if let Err(err) = ncrp_intake_lib::run().await {
        eprintln!("error [{}]: {err}", err.code());
        std::process::exit(1);
    }
}
