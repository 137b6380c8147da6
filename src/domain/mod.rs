// Domain layer: plain data types and the client port. No process or IO code here.

pub mod model;
pub mod ports;
