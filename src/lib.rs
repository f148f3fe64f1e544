pub mod logger;
pub mod opcode_pipeline;
