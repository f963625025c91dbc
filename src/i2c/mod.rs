pub mod backend;
pub mod protocol;
pub mod st25dv;

mod mailbox;
mod session;

#[cfg(test)]
pub(crate) mod sim;
