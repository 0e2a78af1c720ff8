//! Grading of student router and switch configurations.
//!
//! An instructor provides a master archive with one configuration file per
//! device; a student submits an archive built the same way. This library
//! matches the submitted files to the master devices, understands the
//! configurations independently of abbreviations and statement order, and
//! scores each aspect of each device against the master.
//!
//! # Pipeline
//!
//! 1. [`archive`] loads configuration files out of zip archives
//! 2. [`normalize`] parses each file (via `ios-config-core`) into a
//!    [`normalize::model::NormalizedConfig`], rewriting personal address
//!    space with [`identity`]
//! 3. [`matcher`] pairs submissions with master devices
//! 4. [`checks`] compares each pair, one aspect at a time; [`topology`] and
//!    [`neighbors`] supply the links the network should have
//! 5. [`scoring`] pools the results with the weights of an assignment
//!    [`profile`]
//! 6. [`summary`] holds the serializable result; [`report`] renders it for a
//!    terminal
//!
//! [`grade`] runs the whole pipeline.
//!
//! # Examples
//!
//! ```ignore
//! use netgrade::grade::{grade, GradeRequest};
//!
//! let summary = grade(&GradeRequest {
//!     master: "lab3-master.zip".into(),
//!     student: "lab3-212.05.zip".into(),
//!     hint: "212.05".to_string(),
//!     ..GradeRequest::default()
//! })?;
//! println!("{}", summary.final_score);
//! ```

pub mod addr;
pub mod archive;
pub mod checks;
pub mod grade;
pub mod identity;
pub mod inspect;
pub mod matcher;
pub mod neighbors;
pub mod normalize;
pub mod profile;
pub mod report;
pub mod scoring;
pub mod summary;
pub mod telemetry;
pub mod topology;
