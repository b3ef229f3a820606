use std::cmp::Ordering;

/// Ранжирует кандидатов по похожести имени на запрос.
///
/// Счёт нормализованного Левенштейна приводится к шкале 0..100.
/// Кандидаты с пустыми именами отбрасываются до скоринга. Сортировка
/// стабильная: при равном счёте сохраняется исходный порядок.
pub fn rank<T>(query: &str, candidates: Vec<(String, T)>, limit: usize) -> Vec<(T, f64)> {
    let query = query.trim().to_lowercase();

    let mut scored: Vec<(T, f64)> = candidates
        .into_iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, payload)| {
            let score = strsim::normalized_levenshtein(&query, &name.trim().to_lowercase()) * 100.0;
            (payload, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}
