mod buffer;
mod commands;
