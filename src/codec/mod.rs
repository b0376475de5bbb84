pub mod bencodex;
