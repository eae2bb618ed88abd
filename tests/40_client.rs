mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{TestServer, PASSWORD};
use villa_api::client::{villa::VillaQuery, ApiClient, AuthClient, ClientError, VillaClient, VillaNumberClient};
use villa_api::models::{LoginRequestDto, RegistrationRequestDto, VillaCreateDto, VillaNumberCreateDto};

async fn login(api: &ApiClient, user_name: &str) -> Result<String> {
    let auth = AuthClient::new(api.clone());
    auth.register(&RegistrationRequestDto {
        user_name: user_name.to_string(),
        name: user_name.to_string(),
        password: PASSWORD.to_string(),
    })
    .await?
    .into_result()?;

    let login = auth
        .login(&LoginRequestDto {
            user_name: user_name.to_string(),
            password: PASSWORD.to_string(),
        })
        .await?
        .into_result()?
        .expect("login result");
    Ok(login.token)
}

#[tokio::test]
async fn client_reads_paging_and_location() -> Result<()> {
    let server = TestServer::start().await?;
    let api = ApiClient::new(&server.base_url)?;
    let token = login(&api, "client-admin").await?;
    let villas = VillaClient::new(api.clone());

    let reply = villas
        .get_all(&VillaQuery { page_size: Some(3), page_number: Some(1), ..Default::default() }, None)
        .await?;
    assert_eq!(reply.status, StatusCode::OK);
    let pagination = reply.pagination.clone().expect("pagination header");
    assert_eq!(pagination.page_size, 3);
    assert_eq!(reply.into_result()?.unwrap().len(), 3);

    let reply = villas
        .create(
            &VillaCreateDto {
                name: "Client Villa".to_string(),
                occupancy: 2,
                ..Default::default()
            },
            Some(&token),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    let location = reply.location.clone().expect("location header");
    let villa = reply.into_result()?.unwrap();
    assert!(location.ends_with(&format!("/{}", villa.id)));

    let reply = villas
        .patch(villa.id, json!([{ "op": "replace", "path": "/occupancy", "value": 3 }]), Some(&token))
        .await?;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert!(reply.into_result()?.is_none());

    let fetched = villas.get(villa.id, None).await?.into_result()?.unwrap();
    assert_eq!(fetched.occupancy, 3);
    Ok(())
}

#[tokio::test]
async fn client_surfaces_envelope_errors() -> Result<()> {
    let server = TestServer::start().await?;
    let api = ApiClient::new(&server.base_url)?;
    let villas = VillaClient::new(api.clone());

    let err = villas.get(999, None).await?.into_result().unwrap_err();
    match err {
        ClientError::Api { status, messages } => {
            assert_eq!(status, 404);
            assert!(!messages.is_empty());
        }
        other => panic!("unexpected error: {}", other),
    }

    let err = villas
        .delete(1, None)
        .await?
        .into_result()
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, .. }));
    Ok(())
}

#[tokio::test]
async fn villa_number_client_embeds_villas() -> Result<()> {
    let server = TestServer::start().await?;
    let api = ApiClient::new(&server.base_url)?;
    let token = login(&api, "numbers-client").await?;
    let numbers = VillaNumberClient::new(api.clone(), 2);

    numbers
        .create(
            &VillaNumberCreateDto {
                villa_no: 808,
                villa_id: 1,
                special_details: None,
            },
            Some(&token),
        )
        .await?
        .into_result()?;

    let number = numbers.get(808, None).await?.into_result()?.unwrap();
    assert_eq!(number.villa_id, 1);
    assert_eq!(number.villa.expect("embedded villa").id, 1);

    let whoami = AuthClient::new(api).whoami(&token).await?.into_result()?.unwrap();
    assert_eq!(whoami.name, "numbers-client");
    Ok(())
}
