//! Object store client.

pub mod supabase;

pub use supabase::SupabaseStorage;
