use chrono::NaiveDate;
use redis_connection::{
    cache_key,
    core::{Json, Primitive},
};
use sales_models::{MovieSales, SaleRecord, TheaterRevenue};

cache_key!(SaleCacheKey::<Json<SaleRecord>> => "sale:{}"[sale_id: i32]);
cache_key!(list SalesByTheaterCacheKey::<Json<SaleRecord>> => "sales_theater:{}"[theater_id: i32]);
cache_key!(list SalesByDateCacheKey::<Json<SaleRecord>> => "sales_date:{}"[date: NaiveDate]);
cache_key!(TheaterNameCacheKey::<Primitive<String>> => "theater:{}"[theater_id: i32]);

cache_key!(MoviesByTheaterCacheKey::<Json<Vec<MovieSales>>> => "report:movies_by_theater:{}"[theater_id: i32]);
cache_key!(TopTheaterCacheKey::<Json<TheaterRevenue>> => "report:top_theater:{}"[date: NaiveDate]);
