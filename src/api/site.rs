// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Placeholder for the site the gate sits in front of.

use axum::{response::Html, Extension};

use crate::gate::RequestContext;

pub async fn site(Extension(context): Extension<RequestContext>) -> Html<String> {
    let visitor = if context.is_authenticated() {
        "signed in"
    } else {
        "anonymous"
    };
    Html(format!(
        "<!doctype html><title>Seamless CILogon</title><p>Visitor is {visitor}.</p>"
    ))
}
