pub mod pixel_parser;
