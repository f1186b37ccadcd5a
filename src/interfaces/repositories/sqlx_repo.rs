use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxExerciseImageRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxLanguageRepo {
    pub pool: PgPool,
}
