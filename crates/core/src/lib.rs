pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod media_asset;
    pub mod media_time;
    pub mod output_file;
    pub mod overlay_image;
}

pub mod video {
    pub mod domain {
        pub mod frame_encoder;
        pub mod sink_writer;
        pub mod source_reader;
        pub mod video_settings;
    }
    pub mod infrastructure;
}

pub mod overlay {
    pub mod domain {
        pub mod overlay_renderer;
        pub mod overlay_spec;
        pub mod text_layout;
    }
    pub mod infrastructure;
}

pub mod compositing {
    pub mod domain {
        pub mod frame_compositor;
    }
    pub mod infrastructure;
}

pub mod composition {
    pub mod domain {
        pub mod composition;
        pub mod export_session;
        pub mod exporter;
        pub mod trim_policy;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod compose_movie_use_case;
    pub mod infrastructure;
    pub mod job_config;
    pub mod job_worker;
    pub mod output_locks;
    pub mod pipeline_executor;
    pub mod pipeline_logger;
    pub mod trim_movie_use_case;
}

#[cfg(test)]
mod test_support;
