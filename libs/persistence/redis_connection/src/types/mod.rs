pub mod list;
pub mod normal;

// Re-export the types for easier access
pub use list::List;
pub use normal::Normal;
