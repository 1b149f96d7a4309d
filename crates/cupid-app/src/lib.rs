//! Client-side state machines for Cupid's Cal: the route guard, the admin
//! dashboard's paginated fetch, the prank submission, and login/logout.

pub mod dashboard;
pub mod fetch;
pub mod guard;
pub mod login;
pub mod routes;
pub mod submission;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;
