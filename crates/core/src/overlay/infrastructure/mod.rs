pub mod font_resolver;
pub mod image_overlay_renderer;
pub mod render_context;
pub mod renderer_factory;
pub mod text_overlay_renderer;
