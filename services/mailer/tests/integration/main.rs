
mod campaign_test;
mod nylas_test;
mod router_test;
