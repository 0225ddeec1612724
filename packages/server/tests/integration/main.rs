mod collections;
mod upload;
mod users;
