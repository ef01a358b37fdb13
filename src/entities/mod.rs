pub mod favourite;
pub mod movie;
pub mod movie_cast;
pub mod movie_videos;
pub mod review;
pub mod user;
