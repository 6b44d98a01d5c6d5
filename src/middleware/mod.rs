pub mod error_body_mw;
pub mod request_id_mw;
