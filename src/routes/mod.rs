pub mod predict_route;
pub mod root;
