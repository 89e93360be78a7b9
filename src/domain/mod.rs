// Domain layer - Station data and status rules
pub mod annotations;
pub mod filter;
pub mod history;
pub mod predicates;
pub mod station;
