pub mod availability;
pub mod calendar;
pub mod catalog;
pub mod export;
pub mod overlap;
pub mod property;
pub mod reservation;
pub mod revenue;
pub mod room;
