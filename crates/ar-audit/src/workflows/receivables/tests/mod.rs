mod collaborators;
mod common;
mod policy;
