pub mod template_engine;
