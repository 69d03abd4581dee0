//! Pagination properties over the in-memory repositories: consecutive pages
//! are disjoint, and their union is exactly the filtered set the count reports.

use std::collections::HashSet;
use std::sync::Arc;

use movies_core::memory::MemoryDatabase;
use movies_core::{
    GetAllMoviesOptions, Movie, MovieRepository, MovieService, RatingRepository, SortOrder,
};
use proptest::prelude::*;
use uuid::Uuid;

fn service(db: &MemoryDatabase) -> MovieService {
    let movies: Arc<dyn MovieRepository> = Arc::new(db.movie_repository());
    let ratings: Arc<dyn RatingRepository> = Arc::new(db.rating_repository());
    MovieService::new(movies, ratings)
}

async fn seed(service: &MovieService, movies: &[(String, i32)]) {
    for (i, (title, year)) in movies.iter().enumerate() {
        // Index suffix keeps slugs unique.
        let movie = Movie::new(format!("{title} {i}"), *year, vec!["Drama".into()]);
        service.create(&movie).await.unwrap();
    }
}

async fn collect_pages(service: &MovieService, base: &GetAllMoviesOptions) -> Vec<Vec<Uuid>> {
    let mut pages = Vec::new();
    let mut page = 1;
    loop {
        let options = GetAllMoviesOptions { page, ..base.clone() };
        let items = service.get_all(&options).await.unwrap();
        if items.is_empty() {
            break;
        }
        pages.push(items.iter().map(|m| m.id).collect());
        page += 1;
    }
    pages
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pages_partition_the_filtered_set(
        movies in prop::collection::vec(("(Alpha|Beta|Gamma)", 1990i32..1995), 0..40),
        page_size in 1i32..=25,
        title in prop::option::of("(alpha|BETA|gam)"),
        year in prop::option::of(1990i32..1995),
        sort in prop::option::of(prop_oneof![Just("title"), Just("yearOfRelease")]),
        descending in any::<bool>(),
    ) {
        runtime().block_on(async {
            let db = MemoryDatabase::new();
            let service = service(&db);
            seed(&service, &movies).await;

            let base = GetAllMoviesOptions {
                title: title.clone(),
                year_of_release: year,
                sort_field: sort.map(String::from),
                sort_order: match (sort, descending) {
                    (None, _) => SortOrder::Unsorted,
                    (Some(_), true) => SortOrder::Descending,
                    (Some(_), false) => SortOrder::Ascending,
                },
                page_size,
                ..Default::default()
            };

            let pages = collect_pages(&service, &base).await;
            let total = service.get_count(&base.filter()).await.unwrap();

            let mut seen = HashSet::new();
            for page in &pages {
                prop_assert!(page.len() <= page_size as usize);
                for id in page {
                    prop_assert!(seen.insert(*id), "id {} appeared on two pages", id);
                }
            }
            prop_assert_eq!(seen.len() as i64, total);

            let expected = movies
                .iter()
                .enumerate()
                .filter(|(i, (t, y))| {
                    let full = format!("{t} {i}").to_lowercase();
                    let title_ok = title.as_ref().map_or(true, |needle| full.contains(&needle.to_lowercase()));
                    let year_ok = year.map_or(true, |wanted| *y == wanted);
                    title_ok && year_ok
                })
                .count();
            prop_assert_eq!(total, expected as i64);
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn page_one_and_two_are_disjoint() {
    let db = MemoryDatabase::new();
    let service = service(&db);
    let seeded: Vec<(String, i32)> = (0..7).map(|_| ("Movie".to_string(), 2000)).collect();
    seed(&service, &seeded).await;

    let first = GetAllMoviesOptions {
        page: 1,
        page_size: 5,
        ..Default::default()
    };
    let second = GetAllMoviesOptions { page: 2, ..first.clone() };

    let a = service.get_all(&first).await.unwrap();
    let b = service.get_all(&second).await.unwrap();
    assert_eq!(a.len(), 5);
    assert_eq!(b.len(), 2);
    assert!(a.iter().all(|m| b.iter().all(|n| n.id != m.id)));
}
