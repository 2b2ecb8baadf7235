pub mod cpu_overlay_renderer;
