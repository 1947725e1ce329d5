use rocket::Route;

mod admin;
mod common;
mod join_requests;
mod judging;
mod public;
mod teams;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(teams::routes());
    routes.extend(join_requests::routes());
    routes.extend(judging::routes());
    routes
}
