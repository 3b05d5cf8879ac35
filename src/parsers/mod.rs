pub mod express_parser;
