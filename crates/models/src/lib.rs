pub mod errors;
pub mod db;
pub mod user;
pub mod access_token;

#[cfg(test)]
mod tests;
