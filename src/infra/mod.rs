pub mod db;
pub mod imagekit;
