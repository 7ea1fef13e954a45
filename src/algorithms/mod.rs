pub mod flocking;
