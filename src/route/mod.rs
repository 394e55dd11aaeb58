pub mod books;
pub mod docs;
