pub mod bit_map;
