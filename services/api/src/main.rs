use hcc_raf_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("hcc-raf error: {err}");
        std::process::exit(1);
    }
}
