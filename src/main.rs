use dwc_helper::error::ReconcileError;

fn main() {
    if let Err(err) = dwc_helper::run() {
        match err.downcast_ref::<ReconcileError>() {
            Some(ReconcileError::Usage) => println!("{err}"),
            _ => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
}
