pub mod display;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod store;
pub mod validation;
