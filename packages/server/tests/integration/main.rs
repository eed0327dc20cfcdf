mod common;

mod component;
mod health;
