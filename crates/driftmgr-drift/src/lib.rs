pub mod compare;
pub mod detector;
pub mod sensitivity;
pub mod smart_filter;

pub use compare::diff_properties;
pub use detector::detect;
pub use sensitivity::classify_path;
pub use smart_filter::apply_smart_filter;
