mod builder;

pub use builder::JsonResponseBuilder;
