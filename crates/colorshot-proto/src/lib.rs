//! Protobuf messages for the center-color sample log.
//!
//! The CLI writes one [`proto::SampleSession`] per analyzed source,
//! length-delimited, so several sessions can be concatenated in one file.

pub mod proto {
    /// A single emitted center-pixel color.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ColorSample {
        /// Absolute frame number from the start of the source (0-based).
        #[prost(uint32, tag = "1")]
        pub frame_number: u32,
        /// Frame timestamp in milliseconds from the start of the source.
        #[prost(uint64, tag = "2")]
        pub timestamp_ms: u64,
        #[prost(uint32, tag = "3")]
        pub r: u32,
        #[prost(uint32, tag = "4")]
        pub g: u32,
        #[prost(uint32, tag = "5")]
        pub b: u32,
        /// `#RRGGBB`, uppercase.
        #[prost(string, tag = "6")]
        pub hex: ::prost::alloc::string::String,
        /// Packed opaque `0xAARRGGBB` swatch value.
        #[prost(fixed32, tag = "7")]
        pub argb: u32,
        /// Path of the snapshot saved for this sample, if any.
        #[prost(string, optional, tag = "8")]
        pub snapshot_path: ::core::option::Option<::prost::alloc::string::String>,
    }

    /// Where the frames came from.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SourceMetadata {
        #[prost(string, tag = "1")]
        pub file_path: ::prost::alloc::string::String,
        #[prost(uint32, tag = "2")]
        pub width: u32,
        #[prost(uint32, tag = "3")]
        pub height: u32,
        #[prost(double, tag = "4")]
        pub fps: f64,
        /// Raw pixel format requested from the decoder (`yuv420p` or `nv12`).
        #[prost(string, tag = "5")]
        pub pixel_format: ::prost::alloc::string::String,
    }

    /// All samples emitted while analyzing one source.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SampleSession {
        #[prost(message, optional, tag = "1")]
        pub source: ::core::option::Option<SourceMetadata>,
        /// Minimum interval between emissions, in milliseconds.
        #[prost(uint32, tag = "2")]
        pub min_interval_ms: u32,
        /// Number of frames decoded, including discarded ones.
        #[prost(uint32, tag = "3")]
        pub frames_decoded: u32,
        #[prost(message, repeated, tag = "4")]
        pub samples: ::prost::alloc::vec::Vec<ColorSample>,
    }
}
