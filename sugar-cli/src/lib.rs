//! SugarCRM SOAP client library and command-line tool

pub mod api;
pub mod cli;
pub mod config;
