mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};

use common::{file, multipart_request, recipe_fields, text, token_for, TestApp, JPEG_BYTES};
use nutri_api::database::models::Role;

#[tokio::test]
async fn png_recipe_image_is_rejected_before_upload() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    let mut parts = recipe_fields();
    parts.push(file("imagem", "foto.png", "image/png", b"\x89PNG\r\n"));

    let (status, body) = app
        .send(multipart_request(Method::POST, "/recipes/create", &token, &parts))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Apenas arquivos .jpg e .jpeg são aceitos.");
    assert!(app.images.uploaded().is_empty());
    Ok(())
}

#[tokio::test]
async fn incomplete_recipe_never_uploads() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    let parts = vec![
        text("nome", "Omelete"),
        file("imagem", "foto.jpg", "image/jpeg", JPEG_BYTES),
    ];
    let (status, body) = app
        .send(multipart_request(Method::POST, "/recipes/create", &token, &parts))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Preencha todos os campos obrigatórios.");
    assert!(app.images.uploaded().is_empty());
    Ok(())
}

#[tokio::test]
async fn oversized_image_is_rejected() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);
    let big = vec![0xFFu8; 3 * 1024 * 1024 + 1];

    let parts = vec![file("profilePicture", "eu.jpg", "image/jpeg", &big)];
    let (status, _) = app
        .send(multipart_request(Method::PUT, "/users/update-pictures/3/3", &token, &parts))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.images.uploaded().is_empty());
    Ok(())
}

#[tokio::test]
async fn picture_update_needs_an_image() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    let parts = vec![text("note", "sem imagens")];
    let (status, body) = app
        .send(multipart_request(Method::PUT, "/users/update-pictures/3/3", &token, &parts))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Imagens não fornecidas.");
    Ok(())
}

#[tokio::test]
async fn picture_update_for_other_profile_is_forbidden() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(3, Role::Member);

    let parts = vec![file("profilePicture", "eu.jpg", "image/jpeg", JPEG_BYTES)];
    let (status, _) = app
        .send(multipart_request(Method::PUT, "/users/update-pictures/4/3", &token, &parts))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.images.uploaded().is_empty());
    Ok(())
}

#[tokio::test]
async fn article_requires_its_image() -> Result<()> {
    let app = TestApp::offline();
    let token = token_for(5, Role::Nutritionist);

    let parts = vec![text("articleTitle", "Proteínas"), text("articleText", "<p>Oi</p>")];
    let (status, body) = app
        .send(multipart_request(Method::POST, "/articles/create", &token, &parts))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Preencha todos os campos obrigatórios.");
    Ok(())
}
