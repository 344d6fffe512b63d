pub mod hon;
