use dotenv::dotenv;

/// Loads a `.env` file from the working directory when one exists.
pub fn init() {
    if dotenv().is_err() {
        log::debug!("no .env file found, using process environment only");
    }
}
