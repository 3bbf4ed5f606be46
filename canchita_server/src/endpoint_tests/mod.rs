pub mod mocks;

mod matches;
mod webhooks;
