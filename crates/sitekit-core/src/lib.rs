#![forbid(unsafe_code)]

//! Core: host clock, timers, rate limiting, geometry, focus management, and
//! the document abstraction every widget controller is written against.
//!
//! Nothing in this crate reads wall-clock time or touches a real browser.
//! The host advances a [`clock::DeterministicClock`], pushes
//! [`event::PageEvent`] values, and implements [`dom::Dom`].

pub mod animation;
pub mod capabilities;
pub mod clock;
pub mod dom;
pub mod event;
pub mod focus;
pub mod geometry;
pub mod selector;
pub mod timer;
pub mod timing;
