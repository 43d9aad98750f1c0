//! Server-rendered HTML pages
//!
//! Plain `format!` templates. Every user-supplied value goes through
//! [`escape`] before it is interpolated.

use crate::db::users::{User, UserType};
use crate::homes::Home;

const STYLE: &str = r#"
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 0;
            color: #222;
            background-color: #fafafa;
        }
        header {
            background-color: #ff385c;
            color: #fff;
            padding: 12px 20px;
            display: flex;
            justify-content: space-between;
            align-items: center;
        }
        header a, header button {
            color: #fff;
            margin-left: 12px;
            background: none;
            border: none;
            font-size: 15px;
            cursor: pointer;
        }
        main { padding: 20px; }
        .homes { display: flex; flex-wrap: wrap; gap: 20px; }
        .home { width: 260px; background: #fff; border-radius: 8px; padding: 10px; }
        .home img { width: 100%; border-radius: 6px; }
        form.edit label { display: block; margin-top: 10px; }
        .error { color: #b00020; }
"#;

/// Escape text for HTML element and attribute context
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `src`/`href` for a stored file reference
///
/// Absolute URLs pass through; root-relative paths get a leading `/`.
pub fn asset_src(reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        escape(reference)
    } else {
        format!("/{}", escape(reference.trim_start_matches('/')))
    }
}

fn nav(user: Option<&User>) -> String {
    match user {
        Some(user) => {
            let host_links = if user.user_type == UserType::Host {
                r#"<a href="/host/host-home-list">Host Homes</a><a href="/host/add-home">Add Home</a>"#
            } else {
                ""
            };
            format!(
                r#"<nav><a href="/homes">Homes</a>{}<span> {} </span><form method="post" action="/logout" style="display:inline"><button type="submit">Logout</button></form></nav>"#,
                host_links,
                escape(&user.first_name)
            )
        }
        None => {
            r#"<nav><a href="/homes">Homes</a><a href="/login">Login</a><a href="/signup">Signup</a></nav>"#
                .to_string()
        }
    }
}

fn layout(title: &str, user: Option<&User>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | Homestay</title>
    <style>{style}</style>
</head>
<body>
    <header><a href="/"><strong>Homestay</strong></a>{nav}</header>
    <main>
        <h1>{title}</h1>
        {body}
    </main>
</body>
</html>"#,
        title = escape(title),
        style = STYLE,
        nav = nav(user),
        body = body,
    )
}

fn home_card(home: &Home, actions: &str) -> String {
    format!(
        r#"<div class="home">
            <img src="{photo}" alt="{name}">
            <h3>{name}</h3>
            <p>{location}</p>
            <p>Rs {price} / night &middot; {rating} &#9733;</p>
            {actions}
        </div>"#,
        photo = asset_src(&home.photo),
        name = escape(&home.house_name),
        location = escape(&home.location),
        price = home.price,
        rating = home.rating,
        actions = actions,
    )
}

/// Public listing
pub fn home_list(homes: &[Home], user: Option<&User>) -> String {
    let cards: String = if homes.is_empty() {
        "<p>No homes listed yet.</p>".to_string()
    } else {
        homes
            .iter()
            .map(|home| {
                home_card(
                    home,
                    &format!(r#"<a href="/homes/{}">Details</a>"#, home.id),
                )
            })
            .collect()
    };
    layout("Homes", user, &format!(r#"<div class="homes">{}</div>"#, cards))
}

pub fn home_detail(home: &Home, user: Option<&User>) -> String {
    let rules = match &home.rules_url {
        Some(rules) => format!(r#"<p><a href="{}">House rules (PDF)</a></p>"#, asset_src(rules)),
        None => String::new(),
    };
    let body = format!(
        r#"<img src="{photo}" alt="{name}" style="max-width:600px">
        <p>{location}</p>
        <p>Rs {price} / night &middot; {rating} &#9733;</p>
        <p>{description}</p>
        {rules}"#,
        photo = asset_src(&home.photo),
        name = escape(&home.house_name),
        location = escape(&home.location),
        price = home.price,
        rating = home.rating,
        description = escape(&home.description),
        rules = rules,
    );
    layout(&home.house_name, user, &body)
}

/// Host listing with edit and delete controls
pub fn host_home_list(homes: &[Home], user: Option<&User>) -> String {
    let cards: String = homes
        .iter()
        .map(|home| {
            let actions = format!(
                r#"<a href="/host/edit-home/{id}?editing=true">Edit</a>
            <form method="post" action="/host/delete-home/{id}" style="display:inline">
                <button type="submit">Delete</button>
            </form>"#,
                id = home.id
            );
            home_card(home, &actions)
        })
        .collect();
    let body = format!(
        r#"<p><a href="/host/add-home">Add a home</a></p><div class="homes">{}</div>"#,
        cards
    );
    layout("Host Homes", user, &body)
}

/// Add form when `home` is `None`, edit form otherwise
pub fn edit_home(home: Option<&Home>, user: Option<&User>) -> String {
    let (title, action, submit) = match home {
        Some(_) => ("Edit Home", "/host/edit-home", "Update Home"),
        None => ("Add Home", "/host/add-home", "Add Home"),
    };
    let value = |f: fn(&Home) -> String| home.map(f).map(|v| escape(&v)).unwrap_or_default();

    let hidden_id = home
        .map(|h| format!(r#"<input type="hidden" name="id" value="{}">"#, h.id))
        .unwrap_or_default();
    let current_photo = home
        .map(|h| format!(r#"<img src="{}" alt="current photo" width="160">"#, asset_src(&h.photo)))
        .unwrap_or_default();
    let current_rules = home
        .and_then(|h| h.rules_url.as_deref())
        .map(|r| format!(r#"<a href="{}">Current rules</a>"#, asset_src(r)))
        .unwrap_or_default();

    let body = format!(
        r#"<form class="edit" method="post" action="{action}" enctype="multipart/form-data">
            {hidden_id}
            <label>House name <input type="text" name="houseName" value="{house_name}" required></label>
            <label>Price per night <input type="number" step="any" min="0" name="price" value="{price}" required></label>
            <label>Location <input type="text" name="location" value="{location}" required></label>
            <label>Rating <input type="number" step="any" min="0" max="5" name="rating" value="{rating}" required></label>
            <label>Photo {current_photo} <input type="file" name="photo" accept="image/jpeg,image/png"></label>
            <label>Description <textarea name="description">{description}</textarea></label>
            <label>House rules {current_rules} <input type="file" name="details" accept="application/pdf"></label>
            <button type="submit">{submit}</button>
        </form>"#,
        action = action,
        hidden_id = hidden_id,
        house_name = value(|h| h.house_name.clone()),
        price = value(|h| h.price.to_string()),
        location = value(|h| h.location.clone()),
        rating = value(|h| h.rating.to_string()),
        current_photo = current_photo,
        description = value(|h| h.description.clone()),
        current_rules = current_rules,
        submit = submit,
    );
    layout(title, user, &body)
}

fn error_line(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

pub fn login(error: Option<&str>, email: &str) -> String {
    let body = format!(
        r#"{error}
        <form method="post" action="/login">
            <label>Email <input type="email" name="email" value="{email}" required></label>
            <label>Password <input type="password" name="password" required></label>
            <button type="submit">Login</button>
        </form>
        <p>No account? <a href="/signup">Sign up</a></p>"#,
        error = error_line(error),
        email = escape(email),
    );
    layout("Login", None, &body)
}

/// Values echoed back into the signup form after a failed attempt
#[derive(Debug, Default)]
pub struct SignupValues<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub user_type: &'a str,
}

pub fn signup(error: Option<&str>, values: &SignupValues<'_>) -> String {
    let checked = |kind: &str| if values.user_type == kind { "checked" } else { "" };
    let body = format!(
        r#"{error}
        <form method="post" action="/signup">
            <label>First name <input type="text" name="first_name" value="{first_name}" required></label>
            <label>Last name <input type="text" name="last_name" value="{last_name}"></label>
            <label>Email <input type="email" name="email" value="{email}" required></label>
            <label>Password <input type="password" name="password" required></label>
            <label>Confirm password <input type="password" name="confirm_password" required></label>
            <label><input type="radio" name="user_type" value="guest" {guest}> Guest</label>
            <label><input type="radio" name="user_type" value="host" {host}> Host</label>
            <button type="submit">Sign up</button>
        </form>"#,
        error = error_line(error),
        first_name = escape(values.first_name),
        last_name = escape(values.last_name),
        email = escape(values.email),
        guest = checked("guest"),
        host = checked("host"),
    );
    layout("Sign up", None, &body)
}

pub fn error_page(status: u16, message: &str) -> String {
    let body = format!(
        r#"<p class="error">{}</p><p><a href="/">Back to homes</a></p>"#,
        escape(message)
    );
    layout(&format!("Error {}", status), None, &body)
}
