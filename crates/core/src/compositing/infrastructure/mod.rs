pub mod alpha_over_compositor;
