use crate::{
    catalog::CatalogStore,
    error::{AppError, AppResult},
    models::MovieBundle,
    tmdb::TmdbClient,
};

/// Pulls one movie from upstream into the local catalog. The duplicate check
/// here avoids upstream calls; the primary key still guards the insert.
pub async fn import_movie(
    catalog: &CatalogStore,
    tmdb: &TmdbClient,
    movie_id: i32,
) -> AppResult<MovieBundle> {
    if catalog.exists(movie_id).await? {
        return Err(AppError::conflict("Movie already exists in local database"));
    }

    let bundle = tmdb.fetch_bundle(movie_id).await?;
    if bundle.movie.id != movie_id {
        return Err(AppError::Internal(anyhow::anyhow!(
            "upstream returned movie {} for requested id {movie_id}",
            bundle.movie.id
        )));
    }

    catalog.insert_bundle(&bundle).await?;
    Ok(bundle)
}
